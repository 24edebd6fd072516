mod controls;
mod detail;
mod overview;
mod panels;
