fn main() {
    drone_survey::cli::run();
}
