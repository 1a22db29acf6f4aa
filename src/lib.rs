//! # rink-ledger
//!
//! Ingests per-game player statistics from the NHL stats API into SQLite.
//!
//! A run keeps only games on the schedules of an allow-listed set of teams
//! and, within those games, only players whose nationality matches a target
//! code. The
//! resulting rows are flattened, de-duplicated on
//! `(game_pk, season, game_type, player_id)`, and served back through a CLI
//! and a small HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │ Stats API  │──▶│ teams → schedules → boxscores │──▶│  SQLite  │
//! │  (HTTP)    │   │        (ingest pipeline)      │   │  store   │
//! └────────────┘   └──────────────────────────────┘   └────┬─────┘
//!                                                          │
//!                                        ┌─────────────────┤
//!                                        ▼                 ▼
//!                                   ┌──────────┐     ┌──────────┐
//!                                   │   CLI    │     │   HTTP   │
//!                                   │  (rink)  │     │  server  │
//!                                   └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rink init                          # create database
//! rink update --season 2021          # ingest the 2020-2021 regular season
//! rink query --season 2021
//! rink serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Pipeline error kinds |
//! | [`models`] | Core data types |
//! | [`client`] | Stats API client |
//! | [`teams`] | Team list filtering |
//! | [`schedule`] | Schedule expansion and game de-duplication |
//! | [`boxscore`] | Per-player extraction from boxscores |
//! | [`store`] | Record persistence |
//! | [`ingest`] | Pipeline orchestration |
//! | [`query`] | Record retrieval |
//! | [`roster`] | Team roster lookup |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation and reset |

pub mod boxscore;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod query;
pub mod roster;
pub mod schedule;
pub mod server;
pub mod store;
pub mod teams;
