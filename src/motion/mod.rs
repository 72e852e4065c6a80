pub mod integrator;
pub mod velocity;

pub use integrator::{CanvasBounds, MotionIntegrator};
pub use velocity::VelocityEstimator;
