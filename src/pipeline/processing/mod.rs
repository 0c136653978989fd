// Pipeline processing: typing the raw sheet and checking the result

pub mod normalize;
pub mod quality_gate;
