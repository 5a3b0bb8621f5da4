// fn main not required
//
// all API tests live in a single test binary: each tests/*.rs file is linked
// separately, and linking is sequential
mod contact;
mod health_check;
mod helpers;
mod preview;
