pub mod feed;
pub mod interleave;
pub mod keypool;
pub mod providers;
pub mod recommendations;
pub mod session;
