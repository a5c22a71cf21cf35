// Copyright 2015-2021 The gfx-rs developers and the DeepSea developers.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Foundation services for the render-graph execution core: allocators,
//! intrusive-style containers, the concurrency toolbox, a thread pool,
//! thread-local object storage, a ZIP archive reader, and the
//! process-wide unique-name interner.

pub mod allocator;
pub mod container;
pub mod error;
pub mod sync;
pub mod thread_pool;
pub mod thread_storage;
pub mod unique_name;
pub mod zip;

pub use error::{Error, ErrorKind, Result};
