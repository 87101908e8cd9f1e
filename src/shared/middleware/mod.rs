pub mod bearer_middleware;
