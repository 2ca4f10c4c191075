fn main() {
    parcera::cli::run();
}
