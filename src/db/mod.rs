// src/db/mod.rs

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_test_connection, get_connection, get_database_path,
    open_writer_connection, ConnectionPool, PooledConn,
};
pub use migrations::initialize_database;
