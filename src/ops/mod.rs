pub mod clipboard;
pub mod scripting;
pub mod shapes;
pub mod text;
pub mod transform;
