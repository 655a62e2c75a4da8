//! Test modules for the HTTP transport
//!
//! `http_transport_tests` drives [`RpcHttpHandler`](crate::RpcHttpHandler)
//! in-process and over a loopback socket.

mod http_transport_tests;
