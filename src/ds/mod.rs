pub mod lazy_heap;
pub mod use_order;

pub use lazy_heap::LazyMinHeap;
pub use use_order::UseOrderList;
