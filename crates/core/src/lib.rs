// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bw-core: pure types for the blobwatch trigger host
//!
//! This crate provides:
//! - Path patterns with a capture matcher and a typed binding contract
//! - Object locators and storage naming rules
//! - Pending events and per-container scan cursors
//! - Clock, ID and cancellation abstractions

pub mod cancel;
pub mod clock;
pub mod cursor;
pub mod event;
pub mod id;
pub mod locator;
pub mod pattern;

pub use cancel::{CancelSignal, CancelSource};
pub use clock::{Clock, FakeClock, SystemClock};
pub use cursor::{ScanCursor, SweepState};
pub use event::{DeliveryKey, EventSource, PendingEvent};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use locator::{
    split_path, validate_container_name, validate_object_name, NameError, ObjectLocator,
};
pub use pattern::{
    BindingData, BindingDataContract, CaptureMatcher, ParameterResolvers, PathPattern,
    PatternError, RenderError, Token, ValueKind,
};
