mod emitter;
mod wrapper;

pub use emitter::statement;
pub use wrapper::{wrap, wrap_argv, WrapperContext};
