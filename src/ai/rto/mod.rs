pub mod inference_rto;
