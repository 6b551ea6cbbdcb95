//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod list;
pub mod number;
pub mod string;

pub use boolean::*;
pub use list::*;
pub use number::*;
pub use string::*;
