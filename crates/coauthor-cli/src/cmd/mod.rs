pub mod edges;
pub mod network;
pub mod run;
pub mod top;
