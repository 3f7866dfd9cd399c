pub mod label_allocator;
