pub mod expiry_loop;
