// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for environment detection events.

use std::fmt::{Display, Formatter};

/// A serverless environment marker was found; defaults flip to
/// no-retention, single-instance pooling.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ServerlessMarkerDetected<'a> {
    pub marker: &'a str,
}

impl Display for ServerlessMarkerDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Serverless execution context detected via {}, native handle retention disabled",
            self.marker
        )
    }
}
