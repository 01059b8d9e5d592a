pub mod range;
pub mod range_set;

pub use range::{Ipv4Range, RangeError, contains, expand, parse_cidr};
pub use range_set::RangeSet;
