pub mod circulation;
pub mod clock;
