use thiserror::Error;

/// Errors raised by the byte block and reader/writer primitives in [`crate::block`]
/// and [`crate::stream`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open {path}")]
    IoOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read from stream")]
    IoRead(#[source] std::io::Error),

    #[error("could not write to {path}")]
    IoWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor position {pos} is out of range (0..={max})")]
    CursorOutOfRange { pos: u64, max: u64 },

    #[error("restore_position called with no saved position")]
    StackEmpty,

    #[error("cannot grow block to {requested} bytes (capacity is {capacity})")]
    CapacityExceeded { requested: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn flatten_errors<T>(mut result: anyhow::Result<T>, chained_error: &anyhow::Error) -> anyhow::Result<T> {
    for error in chained_error.chain() {
        result = anyhow::Context::context(result, anyhow::anyhow!("{}", error));
    }
    result
}

pub trait ReasonsExt {
    fn reasons(&self) -> String;
}

impl ReasonsExt for anyhow::Error {
    fn reasons(&self) -> String {
        let mut reasons = String::new();
        for reason in self.chain().skip(1) {
            if !reasons.is_empty() {
                reasons += "\n";
            }
            reasons += &format!("- {}", reason);
        }
        reasons
    }
}
