/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `serve`   — Run the chat-history API server
- `history` — Inspect the local chat store

These handlers are intentionally small and use the library components:
storage, server, and configuration.
*/

pub mod history;
pub mod serve;
