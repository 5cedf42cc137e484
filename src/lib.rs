pub mod level;
pub mod value;
pub mod record;
pub mod sink;
pub mod noop_sink;
pub mod shutdown;
pub mod writer;
pub mod logger;
pub mod correlation;
pub mod scope;
pub mod middleware;
pub mod layer;

pub mod env;
pub mod config;
pub mod init;

pub mod error;
pub mod task;

pub use level::{parse_level, Severity};
pub use logger::{LogFault, ScopedLogger};
pub use scope::RequestScope;
pub use value::Value;
pub use writer::{AsyncWriter, WriterConfig};
