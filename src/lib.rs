//! Host side of the CGI probes: runs a CGI program for a single request the
//! way the probed web server does, and frames its output as an HTTP response.

pub mod invocation;
pub mod response;
pub mod runner;

pub use {
    invocation::{is_cgi_script, Invocation, DEFAULT_TIMEOUT},
    response::{frame_output, HttpResponse},
    runner::{execute, run, RunError},
};
