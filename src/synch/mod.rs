pub mod mutex_swapper;
