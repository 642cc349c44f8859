mod helpers;

mod session;
