fn main() {
    use md_link_graph::cli::parse;
    let cli = parse();
    md_link_graph::utils::logging::init(cli.quiet, cli.verbose);
    let code = md_link_graph::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
