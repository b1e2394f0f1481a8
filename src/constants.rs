// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name used as event reporter
pub const OPERATOR_NAME: &str = "sops-operator";

/// SopsSecret API coordinates
pub mod api {
    pub const GROUP: &str = "craftypath.github.io";
    pub const VERSION: &str = "v1alpha1";
    pub const KIND: &str = "SopsSecret";
}

/// Kubernetes event reasons and actions
pub mod events {
    pub const REASON_PROCESSING_ERROR: &str = "ProcessingError";
    pub const ACTION_RECONCILE: &str = "Reconcile";
    pub const ACTION_UPDATE_STATUS: &str = "UpdateStatus";
    pub const MSG_STATUS_UPDATE_FAILED: &str = "Unable to update status";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
