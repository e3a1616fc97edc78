//! 진료 기록 도메인 모델.

mod doctor;
mod patient;

pub use doctor::*;
pub use patient::*;
