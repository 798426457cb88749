use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode};
use futures_util::StreamExt;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, Paragraph, Row, Table, TableState,
    },
    Frame,
};
use rust_decimal::Decimal;
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tokio::sync::{mpsc::Sender, watch};

use crate::{
    chart,
    coin::{format_market_cap, format_percentage, format_price, CoinRecord},
    compare::Comparison,
    favorites::Favorites,
    fetch::FetchState,
    portfolio::{valuate, Portfolio},
    search::filter_coins,
};

#[derive(Clone, Copy, Debug, PartialEq, Display, EnumIter)]
enum Tab {
    Markets,
    Favorites,
    Compare,
    Portfolio,
}

struct Detail {
    coin: CoinRecord,
    series: Vec<f64>,
}

pub struct App {
    should_quit: bool,
    rx_state: watch::Receiver<FetchState>,
    tx_refetch: Sender<()>,
    favorites: Favorites,
    portfolio: Portfolio,
    comparison: Comparison,
    tab: Tab,
    query: String,
    searching: bool,
    selected: usize,
    detail: Option<Detail>,
}

impl App {
    pub fn new(
        rx_state: watch::Receiver<FetchState>,
        tx_refetch: Sender<()>,
        favorites: Favorites,
        portfolio: Portfolio,
    ) -> Self {
        Self {
            should_quit: false,
            rx_state,
            tx_refetch,
            favorites,
            portfolio,
            comparison: Comparison::new(),
            tab: Tab::Markets,
            query: String::new(),
            searching: false,
            selected: 0,
            detail: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let _ = terminal.clear();

        let mut events = EventStream::new();
        let mut rx_state = self.rx_state.clone();

        let period = Duration::from_secs_f64(1.0 / 20.0);
        let mut interval = tokio::time::interval(period);

        while !self.should_quit {
            tokio::select! {
                _ = interval.tick() => { terminal.draw(|frame| self.render(frame))?; },
                Some(Ok(event)) = events.next() => self.handle_events(event),
                // new state is picked up from the watch channel on the next draw
                _ = rx_state.changed() => {}
            }
        }

        Ok(())
    }

    fn state(&self) -> FetchState {
        self.rx_state.borrow().clone()
    }

    /// Coin rows the cursor travels over on the current tab.
    fn rows(&self, state: &FetchState) -> Vec<CoinRecord> {
        match self.tab {
            Tab::Markets => filter_coins(&state.coins, &self.query),
            Tab::Favorites => state
                .coins
                .iter()
                .filter(|coin| self.favorites.is_favorite(&coin.id))
                .cloned()
                .collect(),
            Tab::Compare => self.comparison.available(&state.coins, &self.query),
            Tab::Portfolio => vec![],
        }
    }

    fn selected_coin(&self, state: &FetchState) -> Option<CoinRecord> {
        self.rows(state).get(self.selected).cloned()
    }

    fn next_tab(&mut self) {
        let tabs: Vec<Tab> = Tab::iter().collect();
        let current = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.tab = tabs[(current + 1) % tabs.len()];
        self.selected = 0;
    }

    fn handle_events(&mut self, event: Event) {
        let Some(key) = event.as_key_press_event() else {
            return;
        };

        if self.searching {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.searching = false,
                KeyCode::Backspace => {
                    self.query.pop();
                    self.selected = 0;
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    self.selected = 0;
                }
                _ => {}
            }
            return;
        }

        if self.detail.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.detail = None,
                KeyCode::Char('f') => {
                    if let Some(detail) = &self.detail {
                        let id = detail.coin.id.clone();
                        self.favorites.toggle(&id);
                    }
                }
                _ => {}
            }
            return;
        }

        let state = self.state();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => {
                self.searching = true;
                self.query.clear();
                self.selected = 0;
            }
            KeyCode::Char('r') => {
                let _ = self.tx_refetch.try_send(());
            }
            KeyCode::Tab => self.next_tab(),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                let rows = self.rows(&state).len();
                if rows > 0 && self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            KeyCode::Char('f') => {
                if let Some(coin) = self.selected_coin(&state) {
                    self.favorites.toggle(&coin.id);
                }
            }
            KeyCode::Char('c') => {
                if let Some(coin) = self.selected_coin(&state) {
                    self.comparison.add(coin);
                    let rows = self.rows(&state).len();
                    if self.selected >= rows && rows > 0 {
                        self.selected = rows - 1;
                    }
                }
            }
            KeyCode::Char(c @ '1'..='4') if self.tab == Tab::Compare => {
                let index = c as usize - '1' as usize;
                self.comparison.remove_at(index);
            }
            KeyCode::Char('x') if self.tab == Tab::Favorites => {
                self.favorites.clear();
                self.selected = 0;
            }
            KeyCode::Enter => {
                if let Some(coin) = self.selected_coin(&state) {
                    let series = chart::coin_series(&coin);
                    self.detail = Some(Detail { coin, series });
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let state = self.state();

        let banner_height = if state.error().is_some() { 3 } else { 0 };
        let [header_area, banner_area, main_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(frame.area());

        self.render_header(frame, header_area, &state);
        if banner_height > 0 {
            self.render_banner(frame, banner_area, &state);
        }
        match self.tab {
            Tab::Markets | Tab::Favorites => self.render_coin_table(frame, main_area, &state),
            Tab::Compare => self.render_compare(frame, main_area, &state),
            Tab::Portfolio => self.render_portfolio(frame, main_area, &state),
        }
        self.render_footer(frame, footer_area);

        if let Some(detail) = &self.detail {
            self.render_detail(frame, detail);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, state: &FetchState) {
        let mut spans: Vec<Span> = vec![];
        for tab in Tab::iter() {
            let style = if tab == self.tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {tab} "), style));
            spans.push(Span::raw("|"));
        }
        spans.pop();
        if state.is_loading() {
            spans.push(Span::styled("  loading…", Style::default().fg(Color::Cyan)));
        }
        if self.searching || !self.query.is_empty() {
            spans.push(Span::styled(
                format!("  search: {}▏", self.query),
                Style::default().fg(Color::Magenta),
            ));
        }
        let block = Block::default().title("CryptoDash").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect, state: &FetchState) {
        let Some(message) = state.error() else { return };
        let line = Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(Color::Red)),
            Span::styled(message.to_string(), Style::default().fg(Color::Red)),
            Span::raw("  — showing fallback data, press 'r' to retry"),
        ]);
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_coin_table(&self, frame: &mut Frame, area: Rect, state: &FetchState) {
        let coins = self.rows(state);
        let title = match self.tab {
            Tab::Favorites => format!("Favorites ({})", coins.len()),
            _ => format!("Markets ({})", coins.len()),
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if coins.is_empty() {
            let message = match self.tab {
                Tab::Favorites => "No favorites yet. Press 'f' on a coin to add one.",
                _ => "No coins match the current search.",
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let rows: Vec<Row> = coins.iter().map(|coin| self.coin_row(coin)).collect();
        let table = Table::new(rows, COIN_TABLE_WIDTHS)
            .header(
                Row::new(["", "Name", "Symbol", "Price", "24h", "Market Cap", "★"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .block(block);

        let mut table_state = TableState::default();
        table_state.select(Some(self.selected.min(coins.len() - 1)));
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn coin_row<'a>(&self, coin: &'a CoinRecord) -> Row<'a> {
        Row::new(vec![
            Cell::from(coin.image.clone()),
            Cell::from(coin.name.clone()),
            Cell::from(coin.symbol.to_uppercase()),
            Cell::from(format_price(coin.current_price)),
            Cell::from(format_percentage(coin.price_change_percentage_24h))
                .style(change_style(coin.price_change_percentage_24h)),
            Cell::from(format_market_cap(coin.market_cap)),
            Cell::from(if self.favorites.is_favorite(&coin.id) {
                "★"
            } else {
                ""
            })
            .style(Style::default().fg(Color::Yellow)),
        ])
    }

    fn render_compare(&self, frame: &mut Frame, area: Rect, state: &FetchState) {
        let [selection_area, available_area] = Layout::vertical([
            Constraint::Length(3 + self.comparison.len().max(1) as u16),
            Constraint::Fill(1),
        ])
        .areas(area);

        let block = Block::default()
            .title(format!("Comparison ({}/4)", self.comparison.len()))
            .borders(Borders::ALL);
        if self.comparison.is_empty() {
            frame.render_widget(
                Paragraph::new("Press 'c' on a coin below to add it to the comparison.")
                    .block(block),
                selection_area,
            );
        } else {
            let rows: Vec<Row> = self
                .comparison
                .selected()
                .iter()
                .enumerate()
                .map(|(i, coin)| {
                    Row::new(vec![
                        Cell::from(format!("{}", i + 1)),
                        Cell::from(coin.name.clone()),
                        Cell::from(format_price(coin.current_price)),
                        Cell::from(format_percentage(coin.price_change_percentage_24h))
                            .style(change_style(coin.price_change_percentage_24h)),
                        Cell::from(format_market_cap(coin.market_cap)),
                    ])
                })
                .collect();
            let table = Table::new(
                rows,
                [
                    Constraint::Length(3),
                    Constraint::Fill(2),
                    Constraint::Length(14),
                    Constraint::Length(10),
                    Constraint::Length(12),
                ],
            )
            .header(
                Row::new(["#", "Coin", "Price", "24h", "Market Cap"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(block);
            frame.render_widget(table, selection_area);
        }

        let coins = self.rows(state);
        let block = Block::default()
            .title(format!("Available ({})", coins.len()))
            .borders(Borders::ALL);
        if coins.is_empty() {
            frame.render_widget(
                Paragraph::new("No more coins available to add.").block(block),
                available_area,
            );
            return;
        }
        let rows: Vec<Row> = coins.iter().map(|coin| self.coin_row(coin)).collect();
        let table = Table::new(rows, COIN_TABLE_WIDTHS)
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .block(block);
        let mut table_state = TableState::default();
        table_state.select(Some(self.selected.min(coins.len() - 1)));
        frame.render_stateful_widget(table, available_area, &mut table_state);
    }

    fn render_portfolio(&self, frame: &mut Frame, area: Rect, state: &FetchState) {
        let view = valuate(self.portfolio.holdings(), &state.coins);

        let [summary_area, table_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);

        let gain_style = change_style(view.total_gain_loss);
        let summary = Line::from(vec![
            Span::raw(format!("Total {}", format_price(view.total_value))),
            Span::raw("   "),
            Span::styled(
                format!("Gain/Loss {}", format_price(view.total_gain_loss)),
                gain_style,
            ),
            Span::raw("   "),
            Span::styled(
                format!(
                    "Overall {}",
                    format_percentage(view.overall_gain_loss_percent)
                ),
                gain_style,
            ),
        ]);
        let block = Block::default().title("My Portfolio").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(summary).block(block), summary_area);

        let block = Block::default().title("Holdings").borders(Borders::ALL);
        if view.positions.is_empty() {
            frame.render_widget(
                Paragraph::new("No holdings valuated against the current prices.").block(block),
                table_area,
            );
            return;
        }

        let rows: Vec<Row> = view
            .positions
            .iter()
            .map(|position| {
                let percent = position
                    .gain_loss_percent
                    .map(format_percentage)
                    .unwrap_or_else(|| "—".to_string());
                Row::new(vec![
                    Cell::from(position.coin.name.clone()),
                    Cell::from(position.holding.amount.to_string()),
                    Cell::from(format_price(position.holding.purchase_price)),
                    Cell::from(format_price(position.coin.current_price)),
                    Cell::from(format_price(position.current_value)),
                    Cell::from(format!("{} ({})", format_price(position.gain_loss), percent))
                        .style(change_style(position.gain_loss)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Fill(2),
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Fill(2),
            ],
        )
        .header(
            Row::new(["Asset", "Holdings", "Avg Buy", "Price", "Value", "Gain/Loss"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block);
        frame.render_widget(table, table_area);
    }

    fn render_detail(&self, frame: &mut Frame, detail: &Detail) {
        let coin = &detail.coin;
        let area = centered(frame.area(), 80, 60);
        frame.render_widget(Clear, area);

        let [stats_area, chart_area] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);

        let style = change_style(coin.price_change_percentage_24h);
        let favorite = if self.favorites.is_favorite(&coin.id) {
            "★"
        } else {
            "☆"
        };
        let stats = vec![
            Line::from(vec![
                Span::styled(
                    format!(
                        "{} {} ({}) ",
                        coin.image,
                        coin.name,
                        coin.symbol.to_uppercase()
                    ),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(favorite, Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![
                Span::raw(format!("{}  ", format_price(coin.current_price))),
                Span::styled(format_percentage(coin.price_change_percentage_24h), style),
                Span::raw(format!("  cap {}", format_market_cap(coin.market_cap))),
            ]),
        ];
        let block = Block::default()
            .title(coin.id.clone())
            .borders(Borders::ALL);
        frame.render_widget(Paragraph::new(stats).block(block), stats_area);

        let data: Vec<(f64, f64)> = detail
            .series
            .iter()
            .enumerate()
            .map(|(i, price)| (i as f64, *price))
            .collect();
        let min = data.iter().map(|d| d.1).reduce(f64::min).unwrap_or(0.);
        let max = data.iter().map(|d| d.1).reduce(f64::max).unwrap_or(0.);

        let dataset = Dataset::default()
            .data(&data)
            .marker(symbols::Marker::Braille)
            .style(style)
            .graph_type(ratatui::widgets::GraphType::Line);
        let chart = Chart::new(vec![dataset])
            .x_axis(
                Axis::default()
                    .title("24h")
                    .bounds([0., (data.len().saturating_sub(1)) as f64]),
            )
            .y_axis(Axis::default().title("Price").bounds([min, max]))
            .block(
                Block::default()
                    .title("24h Price Chart")
                    .borders(Borders::ALL),
            );
        frame.render_widget(chart, chart_area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.searching {
            "type to search | Enter/Esc done".to_string()
        } else if self.detail.is_some() {
            "f favorite | Esc close".to_string()
        } else {
            let mut hints =
                "q quit | Tab view | ↑↓ select | / search | f favorite | c compare | Enter detail | r refresh"
                    .to_string();
            if self.tab == Tab::Compare {
                hints.push_str(" | 1-4 remove");
            }
            if self.tab == Tab::Favorites {
                hints.push_str(" | x clear");
            }
            hints
        };
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new(Line::from(hints))
                .alignment(Alignment::Left)
                .block(block),
            area,
        );
    }
}

const COIN_TABLE_WIDTHS: [Constraint; 7] = [
    Constraint::Length(3),
    Constraint::Fill(2),
    Constraint::Length(8),
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(12),
    Constraint::Length(3),
];

fn change_style(value: Decimal) -> Style {
    if value >= Decimal::ZERO {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}
