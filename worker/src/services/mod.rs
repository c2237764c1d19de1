pub mod scheduler_loop;
