/*!
# Leaveboard

A browser-based leave-request approval tool backed by a Google spreadsheet
used as a makeshift database, built in Rust.

## Overview

Leave requests arrive as rows on the first tab of a per-company spreadsheet
(appended by an intake form). This service lets a reviewer list the pending
requests, approve or decline them, archive processed rows, and attach
free-text comments. The spreadsheet has no native "move row" operation, so
every state change is a relocation: append the row to a status tab, then
delete it from its source tab.

## Architecture

The application follows a client-server architecture:

### Frontend Layer
- Thin HTML/JS client consuming the JSON API (served from `/`)

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Request Dispatcher - Maps named actions to core operations
  - Row Relocation Engine - Append-then-delete row movement between tabs
  - Sheet Directory Resolver - Finds or lazily creates status tabs
  - Spreadsheet Client Adapter - Google Sheets v4 REST calls with bounded
    retry on transient failures
  - Company Registry - Immutable company-to-spreadsheet mapping

### Storage
- All durable state lives in the remote spreadsheet; this process holds
  nothing but the read-only configuration.

## Modules

- **sheets**: spreadsheet API port and the Google Sheets client
- **directory**: tab lookup and find-or-create
- **relocate**: the row relocation engine and its specializations
- **registry**: company name to spreadsheet id mapping
- **dispatch**: the JSON action API and date display formatting
- **config**: startup configuration and token loading
- **error**: the error taxonomy
- **app**: routing and server startup

## REST API

A single endpoint, `GET /api`, dispatched on the `action` query parameter:
`getCompanyList`, `getSheetData`, `approveRow`, `declineRow`, `deleteRow`,
`saveComment`. Every response is HTTP 200 with the outcome (data, `{message}`
or `{error}`) in the JSON body.
*/

pub mod app;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod relocate;
pub mod sheets;

/// Re-export the types most callers need.
pub use error::LeaveError;
pub use registry::{Company, CompanyRegistry};
pub use sheets::{GoogleSheetsClient, SheetsApi, Tab};
