pub mod change_cell;
