pub mod clos;
