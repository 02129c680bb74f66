//! # FeePay server
//! This module hosts the HTTP server for the FeePay storefront. It is responsible for:
//! Accepting orders and manual payments from customers.
//! Receiving payment notifications from Midtrans and transaction callbacks from Digiflazz.
//! Exposing the admin surface: order confirmation, payment review, catalog sync and the USDT rate.
//!
//! All order state lives in the engine (`feepay_engine`). This crate plugs the real providers into the engine's seams
//! and maps engine results onto HTTP.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/orders`, `/orders/{id}`, `/orders/{id}/checkout`: Customer order routes.
//! * `/payments`: Manual transfer submissions.
//! * `/usdt/rate`: The current USDT rate.
//! * `/callback/payment-gateway` and `/callback/supplier`: Provider webhooks.
//! * Admin routes, authenticated with the `X-Admin-Token` and `X-Admin-Id` headers.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
