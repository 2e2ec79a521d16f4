use console::Style;
use xrfalign_core::pipeline::config::PipelineConfig;
use xrfalign_core::pipeline::AlignmentReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("XRF Alignment"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Thetas"),
        s.path.apply_to(config.thetas.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Channel"),
        s.value.apply_to(config.alignment.reference_channel)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Sort"),
        if config.alignment.sort_by_angle {
            s.value.apply_to("by angle")
        } else {
            s.disabled.apply_to("file order")
        }
    );
    println!();

    if config.alignment.passes.is_empty() {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Passes"),
            s.disabled.apply_to("none")
        );
    } else {
        println!("  {}", s.header.apply_to("Passes"));
        for (i, pass) in config.alignment.passes.iter().enumerate() {
            println!(
                "    {}. {}",
                s.label.apply_to(i + 1),
                s.method.apply_to(pass)
            );
        }
    }
    println!();
}

pub fn print_alignment_report(report: &AlignmentReport, projections: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Projections"),
        s.value.apply_to(projections)
    );
    if report.sorted {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Reordered"),
            s.value.apply_to("by angle")
        );
    }
    for (i, pass) in report.passes.iter().enumerate() {
        let (max_x, max_y) = pass.max_shift;
        println!(
            "    {}. {:<30}{}",
            s.label.apply_to(i + 1),
            s.method.apply_to(&pass.method),
            s.value.apply_to(format!("max |x|={max_x} px, |y|={max_y} px"))
        );
        if let Some(center) = pass.rotation_center {
            println!(
                "       {:<30}{}",
                s.label.apply_to("Rotation center"),
                s.value.apply_to(format!("{center:.2}"))
            );
        }
    }
    println!();
}
