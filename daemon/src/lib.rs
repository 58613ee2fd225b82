//! arsene-daemon – Bibliotheks-Root
//!
//! Deklariert Konfiguration, Kommandozeile und Befehle; `main.rs` verdrahtet
//! sie nur noch.

pub mod befehle;
pub mod cli;
pub mod config;
