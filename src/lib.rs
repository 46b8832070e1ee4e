pub mod clock;
pub mod config;
pub mod db;
pub mod mail;
pub mod reminders;
pub mod web;
