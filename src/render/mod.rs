pub mod canvas;
pub mod rope;
pub mod spline;
