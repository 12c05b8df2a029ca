#[path = "resources/id.rs"]
mod id;
