pub mod invest;
pub mod limit;
pub mod simulate;
pub mod status;
pub mod unlock;
pub mod wallet;
