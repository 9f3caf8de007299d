//! Collection expansion engine.
//!
//! Two independent expansions turn one runtime argument into many bound
//! parameters:
//!
//! - **IN-clause expansion**: `id IN (@ids)` with `ids = [1, 2]` renders as
//!   `id IN (@ids0, @ids1)`. An empty list renders `1=0` so the SQL never
//!   contains `IN ()`.
//! - **Batch VALUES expansion**: `{{batch_values}}` over `N` rows renders `N`
//!   tuples `(@col_0, ...), (@col_1, ...)`. [`render_batches`] splits large
//!   inputs into several statements, and [`execute_batches`] sums their
//!   affected rows while keeping partial progress visible on failure.

mod batch;
mod in_clause;

pub use batch::{
    BatchFailure, BatchOptions, BatchReport, chunk_size, execute_batches, expand_batch_values,
    render_batches
};
pub(crate) use in_clause::find_in_lists;
pub use in_clause::expand_in_list;
