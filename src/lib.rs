// vision-relay - resize images and forward them to a vision chat completion API
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod relay;
pub mod server;
pub mod utils;
pub mod vision;
