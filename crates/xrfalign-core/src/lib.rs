pub mod align;
pub mod consts;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod projection;
pub mod recon;
pub mod session;
pub mod shift;
