// SPDX-License-Identifier: GPL-3.0-only

//! Output pipelines

pub mod scene;
