// SPDX-License-Identifier: GPL-3.0

pub(crate) mod up;
