mod backends;
mod condvar;
