//! Event loop and reply handlers.

mod auth;
mod catalog;
mod dispatch;
mod routing;
mod rx_loop;
