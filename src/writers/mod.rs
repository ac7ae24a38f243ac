//! Writer implementations

pub mod buffered;
pub mod console;
pub mod multi;
pub mod path;
pub mod rotating_file;

pub use buffered::{BufferedConfig, BufferedWriter};
pub use console::{ConsoleStream, ConsoleWriter};
pub use multi::MultiWriter;
pub use path::validate_log_path;
pub use rotating_file::{RotatingFileWriter, RotationConfig};
