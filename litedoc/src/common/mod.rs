mod constants;
mod fields;
mod lock;
mod sort_order;
pub mod stream;
mod util;
mod value;

pub use constants::*;
pub use fields::*;
pub use lock::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
