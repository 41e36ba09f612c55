//! Governance subsystems: engine Canon, risk Cone, execution gate,
//! Pantheon role boundaries and the weekly review.

pub mod canon;
pub mod cone;
pub mod engines;
pub mod pantheon;
pub mod review;
